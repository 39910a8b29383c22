mod chat_stream_client_test;
