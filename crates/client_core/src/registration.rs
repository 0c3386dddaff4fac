//! Client-side validation for the customer registration form.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

static DIGITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("Invalid digits regex"));

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: String,
    #[serde(rename = "nombreComercial")]
    pub trade_name: String,
    #[serde(rename = "razonSocial")]
    pub legal_name: String,
    #[serde(rename = "direccionEntrega")]
    pub delivery_address: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Digits,
    Email,
}

impl Pattern {
    fn matches(self, value: &str) -> bool {
        match self {
            Pattern::Digits => DIGITS_REGEX.is_match(value),
            Pattern::Email => EMAIL_REGEX.is_match(value),
        }
    }
}

struct FieldRule {
    field: &'static str,
    required: &'static str,
    min: Option<(usize, &'static str)>,
    max: Option<usize>,
    pattern: Option<(Pattern, &'static str)>,
}

const SCHEMA: &[FieldRule] = &[
    FieldRule {
        field: "nombre",
        required: "El nombre es necesario",
        min: None,
        max: Some(75),
        pattern: None,
    },
    FieldRule {
        field: "telefono",
        required: "telefono es necesario",
        min: None,
        max: None,
        pattern: Some((Pattern::Digits, "El teléfono solo debe contener números")),
    },
    FieldRule {
        field: "email",
        required: "email es necesario",
        min: None,
        max: Some(50),
        pattern: Some((Pattern::Email, "email invalido")),
    },
    FieldRule {
        field: "fechaNacimiento",
        required: "feche de nacimiento es necesaria",
        min: None,
        max: None,
        pattern: None,
    },
    FieldRule {
        field: "nombreComercial",
        required: "nombre comercial es necesario",
        min: None,
        max: Some(345),
        pattern: None,
    },
    FieldRule {
        field: "razonSocial",
        required: "razon social es necesaria",
        min: None,
        max: Some(245),
        pattern: None,
    },
    FieldRule {
        field: "direccionEntrega",
        required: "direccion de entrega es necesaria",
        min: None,
        max: Some(45),
        pattern: None,
    },
    FieldRule {
        field: "password",
        required: "contraseña es necesaria",
        min: Some((6, "password must be at least 6 characters")),
        max: Some(100),
        pattern: None,
    },
    FieldRule {
        field: "confirmPassword",
        required: "contraseña es necesaria",
        min: Some((6, "La contraseña debe tener al menos 6 caracteres")),
        max: Some(100),
        pattern: None,
    },
];

const PASSWORD_MISMATCH: &str = "Las contraseñas deben coincidir";

/// Per-field messages, keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("registration form has {} invalid field(s)", .fields.len())]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.fields.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let detail = errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        ApiError::new(ErrorCode::Validation, detail)
    }
}

impl RegistrationForm {
    fn value(&self, field: &str) -> &str {
        match field {
            "nombre" => &self.name,
            "telefono" => &self.phone,
            "email" => &self.email,
            "fechaNacimiento" => &self.birth_date,
            "nombreComercial" => &self.trade_name,
            "razonSocial" => &self.legal_name,
            "direccionEntrega" => &self.delivery_address,
            "password" => &self.password,
            "confirmPassword" => &self.confirm_password,
            _ => "",
        }
    }

    /// Checks every field and reports all failures at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        for rule in SCHEMA {
            let value = self.value(rule.field);
            if value.trim().is_empty() {
                errors.push(rule.field, rule.required);
                continue;
            }
            let len = value.chars().count();
            if let Some((min, message)) = rule.min {
                if len < min {
                    errors.push(rule.field, message);
                }
            }
            if let Some(max) = rule.max {
                if len > max {
                    errors.push(
                        rule.field,
                        format!("{} must be at most {max} characters", rule.field),
                    );
                }
            }
            if let Some((pattern, message)) = rule.pattern {
                if !pattern.matches(value) {
                    errors.push(rule.field, message);
                }
            }
        }

        if !self.confirm_password.is_empty() && self.confirm_password != self.password {
            errors.push("confirmPassword", PASSWORD_MISMATCH);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
