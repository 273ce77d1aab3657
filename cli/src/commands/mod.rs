pub mod delete;
pub mod report;
pub mod validate;

pub use delete::DeleteArgs;
pub use report::ReportArgs;
pub use validate::ValidateArgs;
