mod malicious;
mod pipeline;
