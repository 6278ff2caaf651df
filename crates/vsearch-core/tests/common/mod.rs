pub mod backup_server;
