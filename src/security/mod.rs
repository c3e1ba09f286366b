mod ddos;

pub use ddos::DdosDetector;
