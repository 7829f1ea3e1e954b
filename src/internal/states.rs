pub mod snapshot_property;
