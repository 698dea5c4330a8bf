// Resume intake: pasted text or an uploaded file reduced to plain text.

pub mod extract;
pub mod handlers;
