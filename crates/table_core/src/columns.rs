use serde::Serialize;
use shared::domain::{CellValue, Identity, Record, Role};

use crate::view::CellView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Start,
    End,
}

/// Display rule for numeric cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// Fixed number of decimals, e.g. `Fixed(2)` renders `12.5` as `12.50`.
    Fixed(usize),
}

impl NumberFormat {
    pub fn apply(self, value: f64) -> String {
        match self {
            NumberFormat::Fixed(decimals) => format!("{value:.decimals$}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Data,
    /// Per-row button that opens the record detail.
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub align: Option<Align>,
    pub format: Option<NumberFormat>,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    const fn data(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            align: None,
            format: None,
            kind: ColumnKind::Data,
        }
    }

    pub fn is_action(&self) -> bool {
        self.kind == ColumnKind::Action
    }

    /// Renders this column's cell for `record`. Formats apply to numbers only;
    /// anything else is shown as delivered.
    pub fn render(&self, record: &Record) -> CellView {
        if self.is_action() {
            return CellView::Action {
                record_id: record.id(),
            };
        }
        let text = match (record.get(self.id), self.format) {
            (Some(CellValue::Number(n)), Some(format)) => format.apply(*n),
            (Some(value), _) => value.to_string(),
            (None, _) => String::new(),
        };
        CellView::Text {
            text,
            align: self.align.unwrap_or_default(),
        }
    }
}

const ID_COLUMN: ColumnDescriptor = ColumnDescriptor::data("id", "ID de Orden");

const COMMON_COLUMNS: [ColumnDescriptor; 5] = [
    ID_COLUMN,
    ColumnDescriptor::data("direccion", "Dirección"),
    ColumnDescriptor::data("telefono", "Teléfono"),
    ColumnDescriptor::data("fechaEntrega", "Fecha de Entrega"),
    ColumnDescriptor {
        id: "total",
        label: "Total de la Orden",
        align: Some(Align::End),
        format: Some(NumberFormat::Fixed(2)),
        kind: ColumnKind::Data,
    },
];

const IDENTITY_COLUMNS: [ColumnDescriptor; 3] = [
    ID_COLUMN,
    ColumnDescriptor::data("nombre", "Nombre Completo"),
    ColumnDescriptor::data("email", "Correo Electrónico"),
];

const ACTION_COLUMN: ColumnDescriptor = ColumnDescriptor {
    id: "accion",
    label: "Detalle",
    align: None,
    format: None,
    kind: ColumnKind::Action,
};

/// Ordered, immutable column set resolved for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    pub fn as_slice(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.id).collect()
    }

    pub fn has_action(&self) -> bool {
        self.columns.iter().any(ColumnDescriptor::is_action)
    }

    pub fn render_row(&self, record: &Record) -> Vec<CellView> {
        self.columns.iter().map(|c| c.render(record)).collect()
    }
}

pub fn resolve_columns(role: Role) -> ColumnSet {
    let columns = if role.is_admin() {
        IDENTITY_COLUMNS
            .iter()
            .chain(&COMMON_COLUMNS[1..])
            .chain(std::iter::once(&ACTION_COLUMN))
            .copied()
            .collect()
    } else {
        COMMON_COLUMNS.to_vec()
    };
    ColumnSet { columns }
}

/// Anonymous sessions get the standard column set.
pub fn resolve_for_identity(identity: &Identity) -> ColumnSet {
    resolve_columns(identity.role().unwrap_or(Role::Standard))
}
