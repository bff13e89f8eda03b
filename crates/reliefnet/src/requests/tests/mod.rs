mod common;
mod router;
mod view;
