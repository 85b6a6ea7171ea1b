//! Small helpers shared by the config, cache and logging code.

use std::path::Path;

/// Render a path for logs with the home directory collapsed to `~`.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

/// Join `left` and `right` with enough spaces to fill `width` columns.
///
/// The right part wins when both do not fit; the result is never wider than
/// `width` characters.
pub fn spread(left: &str, right: &str, width: usize) -> String {
    let right: String = right.chars().take(width).collect();
    let right_len = right.chars().count();
    let room = width.saturating_sub(right_len);
    let left: String = left.chars().take(room.saturating_sub(1)).collect();
    let gap = width - right_len - left.chars().count();
    format!("{left}{}{right}", " ".repeat(gap))
}
