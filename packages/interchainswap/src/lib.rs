pub mod asset;
pub mod authz;
pub mod msg;
pub mod packet;
pub mod pool;
pub mod querier;
pub mod token_factory;
