/*!
 * Video session management.
 *
 * This module provides:
 * - `VideoSession`: cache, status and observers of one loaded video
 * - `SessionManager`: keeps at most one live session and drives it
 */

pub mod manager;
pub mod models;
pub mod video;

// Re-export main types
pub use manager::SessionManager;
pub use models::{PrepareOutcome, SessionInfo};
pub use video::VideoSession;
