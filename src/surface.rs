use anyhow::Result;

use crate::model::Mode;

/// What the controller needs from whatever hosts it (terminal UI, headless
/// CLI, test harness).
pub trait Surface {
    /// Mark `active` as the selected mode option and every other option as not.
    fn mode_selected(&mut self, active: Mode);

    fn set_mapping_area_visible(&mut self, visible: bool);

    /// A blocking, user-visible notice.
    fn alert(&mut self, message: &str);

    /// Hand `payload` to the user as a file, suggesting `suggested_name`.
    fn deliver(&mut self, payload: &[u8], suggested_name: &str) -> Result<()>;
}
