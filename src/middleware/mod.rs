/*
 * Responsibility
 * - middleware public surface
 *   - request_gate: token validation in front of /api/v1
 *   - http / cors: router-wide transport concerns
 */
pub mod cors;
pub mod http;
pub mod request_gate;
