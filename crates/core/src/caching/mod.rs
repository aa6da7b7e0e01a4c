pub mod weak_result_cache;
