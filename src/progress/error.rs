use super::TaskId;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot compute progress of `{description}`: total is zero")]
    ZeroTotal { description: String },

    #[error("progress of `{description}` overflowed: {completed} + {delta}")]
    Overflow {
        description: String,
        completed: u64,
        delta: u64,
    },

    #[error("no progress task with id `{0}`")]
    UnknownTask(TaskId),

    #[error("failed to write progress: {0}")]
    Io(#[from] std::io::Error),
}
