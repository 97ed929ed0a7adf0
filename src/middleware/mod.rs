/*!
 * Middleware Module
 *
 * Cross-cutting HTTP concerns: CORS, security headers, deadline propagation,
 * and redaction of Axum's default extractor-rejection bodies.
 */

pub mod cors;
pub mod deadline;
pub mod error_redaction;
pub mod security_headers;
