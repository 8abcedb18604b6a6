mod test_central_fault_scope;
mod test_retry_bookkeeping;
