pub mod pixiv_server;
