pub mod io;
pub mod mask;
pub mod traits;
pub mod u8;

pub use self::mask::{MaskU8, BACKGROUND, FOREGROUND};
pub use self::traits::{ImageView, Rows};
pub use self::u8::{GrayFrame, ImageU8};
