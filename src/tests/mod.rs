// Test modules

mod analysis_service_test;
