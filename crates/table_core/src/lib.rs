//! Role-aware, paginated order table: column resolution, page windowing,
//! generation-guarded fetch slots and the controller that ties them together.

pub mod columns;
pub mod controller;
pub mod driver;
pub mod fetch;
pub mod page;
pub mod view;

pub use columns::{
    resolve_columns, resolve_for_identity, Align, ColumnDescriptor, ColumnKind, ColumnSet,
    NumberFormat,
};
pub use controller::{DetailRequest, ListRequest, TableController, TableOptions};
pub use driver::{Outcome, TableDriver, TableEvent};
pub use fetch::{Completion, FetchSlot, FetchState, Ticket};
pub use page::{PageWindow, PageWindowError, PagingMode, DEFAULT_PAGE_SIZE, ROWS_PER_PAGE_OPTIONS};
pub use view::{CellView, DetailView, HeaderView, Phase, RowView, TableView};
