mod csv;

pub use csv::write_csv;
