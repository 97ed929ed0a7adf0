/*!
 * Database Module
 *
 * Handles PostgreSQL database connection pooling.
 */

pub mod pool;

pub use pool::create_pool;
