mod config;
mod resilient_select;
