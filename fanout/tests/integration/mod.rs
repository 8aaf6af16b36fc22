mod coordinator_test;
mod csv_sink_test;
mod error_log_test;
