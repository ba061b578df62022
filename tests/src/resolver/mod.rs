mod fallback;
mod statements;
