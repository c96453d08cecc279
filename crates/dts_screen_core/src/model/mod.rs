mod parameter;
mod run;
mod value;

pub use parameter::{ParameterDefinition, ParameterKind, RANGE_EPSILON};
pub use run::{
    Assignment, COMPLETION_MARKER, INPUT_FILE, PARAMS_FILE, RunId, RunLayout, RunSpec, RunState,
    id_width,
};
pub use value::{ParameterValue, format_number};
