mod command_input;
mod filter_input;
mod input;
mod key_result;
mod status_picker;
mod summary_editor;

pub use command_input::{CommandEvent, CommandInput};
pub use filter_input::{FilterEvent, FilterInput};
pub use key_result::KeyResult;
pub use status_picker::{StatusPicker, StatusPickerEvent};
pub use summary_editor::{EditEvent, SummaryEditor};
