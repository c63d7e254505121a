//! End-to-end tests for the LADA workspace live under `tests/`.
