pub mod descriptor;
pub mod identity;
pub mod record;

pub use descriptor::{DescriptorArg, IdentityDescriptor};
pub use identity::{ArgValue, Identity};
pub use record::ComputationRecord;
