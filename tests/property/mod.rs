mod batching;
