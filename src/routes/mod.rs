/*!
 * Routes Module
 *
 * Configures all API routes and groups them into logical modules.
 */

pub mod api_v1;

pub use api_v1::{create_api_v1_routes, create_voice_routes};
