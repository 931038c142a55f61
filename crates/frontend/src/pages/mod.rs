pub mod map_screen;
