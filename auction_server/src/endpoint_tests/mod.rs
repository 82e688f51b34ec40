mod helpers;
mod orders;
mod wallet;
