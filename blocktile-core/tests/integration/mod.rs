mod block_store_tests;
mod persistence_tests;
mod workspace_switch_tests;
