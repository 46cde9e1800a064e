pub mod plaza;
