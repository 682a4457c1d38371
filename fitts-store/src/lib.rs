pub mod csv_store;
pub mod upload;

pub use csv_store::{load_dataset, read_csv, save_dataset, write_csv, LoadedDataset, StoreError};
pub use upload::{send_report, JsonLineSink, NullSink, UploadError, UploadSink};
