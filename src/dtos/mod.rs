//! Request and response bodies for the HTTP surface.

mod admin;
mod invoice;

pub use admin::{ClientBody, CsvImportBody, CsvImportReport, ProductBody};
pub use invoice::{
    DraftItem, InvoiceDetail, InvoiceDraft, InvoiceHeader, InvoiceItemRow, InvoiceSummary,
    InvoiceWriteResult, PetGroup,
};
