mod coordinator_test;
mod csv_sink_test;
