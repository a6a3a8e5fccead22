pub mod metadata;
pub mod registrar;
pub mod trampoline;

pub use metadata::{MetadataStore, SingleAction, TrampolineId, TrampolineRecord};
pub use registrar::{InstallOptions, Registrar};
pub use trampoline::{DispatchContext, Outcome, Trampoline};
