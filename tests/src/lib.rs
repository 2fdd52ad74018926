#![cfg(test)]
mod scan;
