mod helpers;
mod layout;
