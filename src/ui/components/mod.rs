mod command_input;
mod input;
mod key_result;
mod prompt_input;
mod tag_picker;

pub use command_input::{CommandEvent, CommandInput};
pub use key_result::KeyResult;
pub use prompt_input::{PromptEvent, PromptInput};
pub use tag_picker::{TagPicker, TagPickerEvent};
