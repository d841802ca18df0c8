pub mod matcher;
pub mod template;

pub use matcher::{compile, Arg, CompiledMatcher, PriorityClass, Slot, SlotKind};
pub use template::{parse, CompileError, Segment, Template, TemplateKind};
