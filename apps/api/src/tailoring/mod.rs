// Résumé tailoring collaborators around the keyword engine.
// Implements: job-posting fetch, hidden keyword injection, PDF verification.
// Fetch failures degrade to empty job text; they never fail a request.

pub mod fetch;
pub mod handlers;
pub mod inject;
pub mod verify;
