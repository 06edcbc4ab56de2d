mod recovery;
mod session;
