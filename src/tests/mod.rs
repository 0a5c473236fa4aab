pub mod test_replay;
