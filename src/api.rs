pub mod growatt;
