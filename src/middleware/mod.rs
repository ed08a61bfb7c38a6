/*
 * Responsibility
 * - Public interface of the middleware layer (re-export)
 * - auth: access gate + route guard; the rest are cross-cutting HTTP concerns
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
