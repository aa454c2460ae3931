mod apply;
mod blocks;
mod core;
mod history;
mod html;
mod list;
mod marks;
mod media;
mod ops;
mod plugin;
mod serde_value;
mod util;

pub use crate::apply::{ApplyError, PathError};
pub use crate::blocks::{MAX_HEADING_LEVEL, heading_level, is_heading_active, is_in_blockquote};
pub use crate::core::*;
pub use crate::html::{escape_html, parse_html, to_html};
pub use crate::list::{ListItemInfo, ListType, MAX_LIST_LEVEL, is_list_active};
pub use crate::marks::{focus_marks, is_mark_active, selection_marks};
pub use crate::media::EmbedBounds;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::serde_value::*;
