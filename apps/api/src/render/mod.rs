// PDF export of the current resume document.

pub mod handlers;
pub mod pdf;
