pub mod owned_or_borrowed;
