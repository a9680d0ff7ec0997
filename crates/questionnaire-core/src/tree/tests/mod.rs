mod common;
mod visibility;
