pub mod collect;
pub mod export;
pub mod filter;

pub use collect::{collect_bundle, default_filename_base, CollectError, ExportOptions};
pub use export::{
    export_data, DateRange, DeliveredFile, DirectorySink, ExportBundle, ExportError, ExportFormat,
    FileSink, MemorySink,
};
pub use filter::{apply_filters, collate, filter_by_date_range};
